//! Map-sharing link resolution.
//!
//! A shared link is usually a short URL that redirects to the full map
//! page. The resolver follows the redirects, checks both ends against a
//! host allow-list and pulls the route's places out of the result.

mod error;
mod parse;
mod resolver;

pub use error::LinkError;
pub use parse::{
    ExtractedPlaces, extract_coordinate_pairs, is_view_state_segment, parse_from_path,
    parse_from_query,
};
pub use resolver::{
    ALLOWED_HOSTS, HttpLinkExpander, LinkExpander, LinkResolver, ResolvedLink, is_allowed_host,
};
