//! File-backed collaborators for the comanda core: catalog sources, the
//! ticket-file order sink and configuration loading.

pub mod catalog_loader;
pub mod config_loader;
pub mod ticket;

pub use catalog_loader::{load_aliases, load_menu, parse_menu, parse_synonyms};
pub use config_loader::load_config;
pub use ticket::TicketWriter;
