pub mod myanimelist;
