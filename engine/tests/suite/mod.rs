mod file_loading;
mod notifications;
mod submission;
