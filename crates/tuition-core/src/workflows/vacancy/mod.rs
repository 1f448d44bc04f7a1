pub mod applications;
pub mod catalog;
pub mod domain;
pub mod repository;
pub mod router;

pub use catalog::{populate, CatalogError, VacancyCatalogService};
pub use domain::{Vacancy, VacancyDraft, VacancyId, VacancyPatch, VacancyStatus, VacancyView};
pub use router::catalog_router;
