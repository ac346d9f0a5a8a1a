use crate::store::VisitStore;

#[derive(Clone)]
pub struct AppState {
    pub store: VisitStore,
}

impl AppState {
    pub fn new(store: VisitStore) -> Self {
        Self { store }
    }
}
