//! Command-layer integration tests


mod test_deploy;
mod test_edit_project;
mod test_new_project;
mod test_update_creds;
