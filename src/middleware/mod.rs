pub mod ensure_logged_in;
