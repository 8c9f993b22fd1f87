pub const HOME: &str = "/";

pub const PROJECTS: &str = "/projects";
pub const BLOG: &str = "/blog";
pub const CONTACT: &str = "/contact";
pub const IMAGE: &str = "/image";

pub const ADMIN: &str = "/admin";
pub const ADMIN_LOGIN: &str = "/admin/login";
pub const ADMIN_LOGOUT: &str = "/admin/logout";
pub const ADMIN_PROJECTS: &str = "/admin/projects";
pub const ADMIN_BLOG: &str = "/admin/blog";
pub const ADMIN_UPLOAD: &str = "/admin/upload";
pub const ADMIN_EDITOR: &str = "/admin/editor";
pub const ADMIN_MESSAGES: &str = "/admin/messages";
pub const ADMIN_ADMINS: &str = "/admin/admins";
