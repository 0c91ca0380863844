//! Realtime scenarios driven through the service layer

mod presence_tests;
mod sequencing_tests;
mod unread_tests;
