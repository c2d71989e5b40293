//! End-to-end tests at the session level.
//!
//! Each test file covers a specific scenario, driving requests through a
//! [`Session`](crate::session::Session) with deterministic inputs and checking
//! the step sequences and the tree left behind.

#![cfg(test)]

mod helpers;

mod test_b_remove_internal_key;
mod test_b_split_on_fourth_insert;
mod test_bplus_split_links_leaves;
mod test_determinism;
mod test_duplicate_insert;
mod test_even_orders;
mod test_insert_remove_single_value;
mod test_invalid_input;
mod test_leaf_chain;
mod test_lexical_values;
mod test_remove_absent;
mod test_round_trip;
mod test_search;
mod test_session;
mod test_snapshot_isolation;
