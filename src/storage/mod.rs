//!  Storage of pomodoro sessions, organized through [session_storage::SessionStorageImpl].
//!  The basic idea is:
//!   - There is a directory with all the sessions.
//!   - Sessions are stored in files holding the sessions started during a UTC day.
//!   - Consumers only see the [record_source::RecordSource] query contract.

pub mod entities;
pub mod record_source;
pub mod session_storage;
