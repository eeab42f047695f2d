pub mod waitlist_server;
