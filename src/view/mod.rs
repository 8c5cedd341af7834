//! Read models for listing and detail screens.

/// The book view model and listing order.
pub mod book_view;
