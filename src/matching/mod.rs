pub mod team_resolver;

pub use team_resolver::{TeamAliasEntry, TeamAliases, TeamResolver};
