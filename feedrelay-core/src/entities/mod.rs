pub mod feed_registration;
