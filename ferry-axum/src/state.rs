use std::sync::Arc;

use crate::{Delivery, ObjectResolver};

/// Shared handler state: the delivery pipeline and the metadata lookup.
#[derive(Clone)]
pub struct FerryAxumState {
    pub delivery: Arc<Delivery>,
    pub resolver: Arc<dyn ObjectResolver>,
}

impl FerryAxumState {
    pub fn new(delivery: Delivery, resolver: Arc<dyn ObjectResolver>) -> Self {
        Self {
            delivery: Arc::new(delivery),
            resolver,
        }
    }
}
