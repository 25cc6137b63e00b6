//! Application Ports (Driven)
//!
//! Ports define interfaces for interacting with external systems: the
//! exchange, notification backends, session persistence, time and settings.

mod clock_port;
mod exchange_port;
mod notifier_port;
mod session_port;
mod settings_port;

pub use clock_port::Clock;
pub use exchange_port::{ExchangeError, ExchangePort, OrderScope};
pub use notifier_port::{Frequency, NoOpNotifier, Notification, NotifierPort, NotifyError, SocialPort};
pub use session_port::{SessionError, SessionGuard, SessionLock, SessionStore};
pub use settings_port::{FixedSettings, SettingsError, SettingsPort};
