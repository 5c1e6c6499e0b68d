//! academy-scrape: session-authenticated extraction of academic data
//! (semesters, attendance, calendar, timetable) from the PESU Academy portal.
//!
//! Each extractor is a thin async fetch around a pure, network-free parser,
//! so every response format can be exercised without a live portal.

pub mod aggregate;
pub mod analytics;
pub mod attendance;
pub mod auth;
pub mod calendar;
pub mod config;
pub mod http_client;
pub mod markup;
pub mod outcome;
pub mod semesters;
pub mod session;
pub mod timetable;
pub mod token;
pub mod types;

pub use aggregate::{fetch_all, fetch_snapshot, ErrorEnvelope, PortalSnapshot};
pub use analytics::{AttendanceStatus, AttendanceSummary, ATTENDANCE_THRESHOLD};
pub use attendance::fetch_attendance;
pub use auth::{authenticate, authenticate_with};
pub use calendar::{fetch_calendar, CalendarExtractor, CalendarStrategy};
pub use config::PortalConfig;
pub use outcome::{ParseOutcome, SourceFormat};
pub use semesters::fetch_semesters;
pub use session::{CredentialProvider, Credentials, EnvCredentials, PortalSession, StaticCredentials};
pub use timetable::fetch_timetable;
pub use token::{resolve_identity, resolve_identity_and_semesters, Identity, ResolvedIdentity, SecurityToken};
pub use types::*;
