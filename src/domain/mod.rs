// Domain layer - Dashboard data and rendered widget state
pub mod snapshot;
pub mod widgets;
