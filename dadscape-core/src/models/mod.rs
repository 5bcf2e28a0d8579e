mod cred;
mod diary;
mod progress;
mod task;
mod task_type;
mod tier;

use chrono::{DateTime, SubsecRound, Utc};

pub use cred::DadCred;
pub use diary::Diary;
pub use progress::{TaskStatus, UserProgress};
pub(crate) use progress::percentage;
pub use task::{Target, Task, TaskError, TaskKind};
pub use task_type::TaskType;
pub use tier::Tier;

/// Current time truncated to the millisecond precision records are stored with.
pub(crate) fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}
