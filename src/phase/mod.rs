//! The three line-local phases `Scanner::scan` dispatches across.
//! EOF handling lives directly in `scanner` since it precedes all of these.

pub mod inline;
pub mod opener;
pub mod prefix;
