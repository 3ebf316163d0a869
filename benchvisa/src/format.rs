//! Filling `{}` placeholders of command templates.

use std::fmt::{self, Display, Write};

use anyhow::anyhow;

use crate::{Error, Result};

enum Piece<'a> {
    Literal(&'a str),
    Arg,
}

/// Splits a template into literal pieces and placeholders.
fn pieces(template: &str) -> Result<Vec<Piece<'_>>> {
    let mut ret = Vec::new();
    let bytes = template.as_bytes();
    let mut start = 0;
    let mut k = 0;
    while k < bytes.len() {
        match bytes[k] {
            b'{' if bytes.get(k + 1) == Some(&b'{') => {
                ret.push(Piece::Literal(&template[start..k + 1]));
                k += 2;
                start = k;
            }
            b'{' if bytes.get(k + 1) == Some(&b'}') => {
                ret.push(Piece::Literal(&template[start..k]));
                ret.push(Piece::Arg);
                k += 2;
                start = k;
            }
            b'}' if bytes.get(k + 1) == Some(&b'}') => {
                ret.push(Piece::Literal(&template[start..k + 1]));
                k += 2;
                start = k;
            }
            b'{' | b'}' => {
                return Err(Error::argument(anyhow!(
                    "Unbalanced brace at offset {} in template `{}`.",
                    k,
                    template
                )));
            }
            _ => k += 1,
        }
    }
    ret.push(Piece::Literal(&template[start..]));
    Ok(ret)
}

/// Number of `{}` placeholders in `template`.
pub fn placeholder_count(template: &str) -> Result<usize> {
    Ok(pieces(template)?.iter().filter(|x| matches!(x, Piece::Arg)).count())
}

struct Counter(usize);

impl Write for Counter {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.0 += s.len();
        Ok(())
    }
}

fn render<W: Write>(out: &mut W, pieces: &[Piece<'_>], args: &[&dyn Display]) -> fmt::Result {
    let mut args = args.iter();
    for piece in pieces {
        match piece {
            Piece::Literal(x) => out.write_str(x)?,
            Piece::Arg => match args.next() {
                Some(arg) => write!(out, "{}", arg)?,
                None => return Err(fmt::Error),
            },
        }
    }
    Ok(())
}

/// Substitute `args` into `template`.
///
/// The output is measured first and then rendered into a buffer allocated to
/// exactly that size, so arguments of any length come out whole.
pub fn format_command(template: &str, args: &[&dyn Display]) -> Result<String> {
    let pieces = pieces(template)?;
    let expected = pieces.iter().filter(|x| matches!(x, Piece::Arg)).count();
    if expected != args.len() {
        return Err(Error::argument(anyhow!(
            "Template `{}` takes {} argument(s), got {}.",
            template,
            expected,
            args.len()
        )));
    }
    let mut counter = Counter(0);
    render(&mut counter, &pieces, args).map_err(|_| Error::internal(anyhow!("Formatting `{}` failed.", template)))?;
    let mut ret = String::with_capacity(counter.0);
    render(&mut ret, &pieces, args).map_err(|_| Error::internal(anyhow!("Formatting `{}` failed.", template)))?;
    Ok(ret)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;

    #[test]
    fn substitutes_in_order() {
        assert_eq!(format_command("VOLT {}", &[&5.5]).unwrap(), "VOLT 5.5");
        assert_eq!(format_command("APPL {},{}", &[&"P6V", &3]).unwrap(), "APPL P6V,3");
        assert_eq!(format_command("*RST", &[]).unwrap(), "*RST");
    }

    #[test]
    fn escaped_braces() {
        assert_eq!(format_command("X {{{}}}", &[&1]).unwrap(), "X {1}");
        assert_eq!(placeholder_count("X {{}}").unwrap(), 0);
        assert_eq!(placeholder_count("A {} B {}").unwrap(), 2);
    }

    #[test]
    fn long_argument_is_not_truncated() {
        let text = "x".repeat(500);
        let ret = format_command("DISP:TEXT \"{}\"", &[&text]).unwrap();
        assert_eq!(ret.len(), 500 + 12);
        assert!(ret.ends_with(&format!("{}\"", text)));
    }

    #[test]
    fn argument_mismatch() {
        let err = format_command("VOLT {}", &[]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Argument);
        assert!(format_command("VOLT", &[&1]).is_err());
        assert_eq!(format_command("VOLT {", &[]).unwrap_err().kind(), ErrorKind::Argument);
    }
}
