pub mod detail;
pub mod extract;
pub mod fetch;
pub mod filter;
pub mod job;
pub mod pagination;
pub mod salary;
pub mod scroll;
pub mod site;
pub mod skills;
