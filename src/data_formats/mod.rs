mod request;
mod response;
mod wrapper;

pub use request::*;
pub use response::*;
pub use wrapper::*;

use serde::{Deserialize, Serialize};

/// `?page=` as sent by the browser. Kept raw so the paginator decides how
/// to read garbage.
#[derive(Deserialize, Serialize, Debug, Default)]
pub struct PageQuery {
    #[serde(default)]
    pub page: Option<String>,
}

#[derive(Deserialize, Serialize, Debug, Default)]
pub struct LoginQuery {
    #[serde(default)]
    pub next: Option<String>,
}
