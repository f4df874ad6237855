pub mod access;
pub mod definition;
pub mod error;
pub mod lock;
pub mod menu;
pub mod repository;
pub mod scaffold;
pub mod types;

pub use access::{ModuleAccess, SitePermissions};
pub use definition::{DefinitionFiles, ModuleDraft};
pub use error::{ModuleError, Result};
pub use menu::{format_menus, RouteResolver, RouteTable};
pub use repository::{ModuleRemoval, ModuleRepository};
pub use scaffold::{DirectoryScaffolder, Scaffolder};
pub use types::*;
