pub mod local_session;
