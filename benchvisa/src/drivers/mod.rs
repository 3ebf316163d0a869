//! Instrument drivers: a [`Session`](crate::Session) plus a private table of
//! command specifications and typed accessors over it.
//!
//! Drivers dereference to their session, so the common commands
//! (`identify`, `reset`, ...) are available on every driver.

pub use agilent66xxa::Agilent66xxA;
pub use power_supply::PowerSupply;
pub use ta5000::ThermalAirTA5000;

pub mod agilent66xxa;
pub mod power_supply;
pub mod ta5000;

macro_rules! session_driver {
    ($name:ident) => {
        impl $name {
            pub fn new(session: crate::Session) -> Self {
                Self { session }
            }

            /// Connect to `resource` through `transport`.
            pub fn open<T: Into<String>>(
                transport: std::sync::Arc<dyn crate::transport::Transport>,
                resource: T,
            ) -> crate::Result<Self> {
                Ok(Self::new(crate::Session::open(transport, resource)?))
            }

            pub fn session(&self) -> &crate::Session {
                &self.session
            }

            pub fn session_mut(&mut self) -> &mut crate::Session {
                &mut self.session
            }

            pub fn into_session(self) -> crate::Session {
                self.session
            }
        }

        impl std::ops::Deref for $name {
            type Target = crate::Session;

            fn deref(&self) -> &crate::Session {
                &self.session
            }
        }

        impl std::ops::DerefMut for $name {
            fn deref_mut(&mut self) -> &mut crate::Session {
                &mut self.session
            }
        }
    };
}

pub(crate) use session_driver;
