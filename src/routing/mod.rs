// Gateway module for mention routing

mod router;

pub use router::{mentions, route, Route};
