pub mod ayna_api_model;
pub mod db_model;
