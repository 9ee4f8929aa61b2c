// Résumé extraction: free text in, structured profile JSON out, stored per email.

pub mod handlers;
pub mod models;
pub mod prompts;
