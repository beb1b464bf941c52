pub mod query;
pub mod smooth;
pub mod subdivide;
