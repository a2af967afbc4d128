// Application state for HTTP handlers
use crate::application::refresh_controller::DashboardController;
use crate::infrastructure::formatting::Locale;

#[derive(Clone)]
pub struct AppState {
    pub controller: DashboardController,
    pub locale: Locale,
}
