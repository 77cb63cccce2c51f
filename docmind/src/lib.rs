pub mod commands;
pub mod handlers;

pub use handlers::{
    apply_overrides, check_invite_email, check_upload_path, exclude_sections, filter_documents,
    find_document, find_member, limit_logs, parse_document_kind, scan_request_timeout,
    settings_update_from_args,
};
