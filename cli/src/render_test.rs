use super::*;
use cvalign::net::types::Role;
use cvalign::routes::paths;
use cvalign::views::cv_filters::CvStatus;

#[test]
fn nav_marks_active_menu_and_child() {
    let shell = NavShell::for_role(Role::Admin);
    let out = nav(&shell, paths::ADMIN_MANAGE_USERS);
    assert!(out.contains("* MANAGE"));
    assert!(out.contains(&format!("    * {:<12}{}", "USERS", paths::ADMIN_MANAGE_USERS)));
    assert!(out.contains(&format!("  {:<16}{}", "DASHBOARD", paths::ADMIN_DASHBOARD)));
    assert!(out.trim_end().ends_with(SIGN_OUT_LABEL));
}

#[test]
fn decision_lines_name_the_page() {
    assert_eq!(decision(paths::SIGN_IN, Decision::Allow), "allow    /signin (Sign In)");
    let line = decision(paths::ADMIN_DASHBOARD, Decision::RedirectTo(paths::SIGN_IN));
    assert!(line.starts_with("redirect /admin/dashboard"));
    assert!(line.ends_with("-> /signin"));
    assert!(decision("/nowhere", Decision::Pending).contains("unknown page"));
}

#[test]
fn cv_table_has_header_and_band() {
    let row = CvRow {
        id: "1".into(),
        file_name: "jane.pdf".into(),
        uploaded_by: "Rita".into(),
        score: 91,
        status: CvStatus::Active,
    };
    let out = cv_table(&[&row]);
    let lines: Vec<_> = out.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].starts_with("SCORE"));
    assert!(lines[1].contains("Excellent"));
    assert!(lines[1].ends_with("Rita"));
}

#[test]
fn field_errors_are_joined() {
    let mut errors = FieldErrors::new();
    errors.insert("email", "bad");
    errors.insert("name", "missing");
    assert_eq!(field_errors(&errors), "email: bad; name: missing");
}
