pub mod multipart;
pub mod query;

pub use multipart::AppMultipart;
pub use query::AppQuery;
