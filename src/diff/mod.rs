//! Diff + Review Pack Assembler (spec §4.6). Computes a `CartDiff` from a
//! before/after snapshot pair and assembles the `ReviewPack` handed to the
//! user at the `review` state — the only point at which decisions and
//! warnings are surfaced for approval, never auto-applied.

pub mod cart_diff;
pub mod review_pack;

pub use cart_diff::compute_diff;
pub use review_pack::assemble_review_pack;
