pub mod ast;
pub mod executor;
pub mod parser;
pub mod request;

pub use ast::{FieldPath, Matcher, OrGroup, QueryExpr};
pub use executor::QueryRunner;
pub use parser::{parse_field_list, parse_limit, parse_offset, parse_query};
pub use request::{parse_request, parse_url, Endpoint, ParsedRequest};
