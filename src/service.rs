pub mod version_service;
