use crate::{
    adapter::{OrderAdapter, OrderReceipt},
    error::AdapterError,
};
use async_trait::async_trait;
use marlin_core::Order;
use parking_lot::Mutex;
use rust_decimal::Decimal;
use std::collections::VecDeque;

/// One recorded adapter interaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FakeCall {
    Place(Order),
    Query(Order),
    Cancel(Order),
}

/// Deterministic adapter for tests: records every call and replays queued
/// responses, falling back to an immediate full fill at a fixed price.
#[derive(Debug)]
pub struct FakeAdapter {
    fill_price: Decimal,
    calls: Mutex<Vec<FakeCall>>,
    responses: Mutex<VecDeque<Result<OrderReceipt, AdapterError>>>,
}

impl FakeAdapter {
    pub fn new(fill_price: Decimal) -> Self {
        Self {
            fill_price,
            calls: Mutex::new(Vec::new()),
            responses: Mutex::new(VecDeque::new()),
        }
    }

    /// Queue the outcome of the next call; queued responses drain in order.
    pub fn push_response(&self, response: Result<OrderReceipt, AdapterError>) {
        self.responses.lock().push_back(response);
    }

    pub fn calls(&self) -> Vec<FakeCall> {
        self.calls.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    fn respond(&self, order: &Order) -> Result<OrderReceipt, AdapterError> {
        match self.responses.lock().pop_front() {
            Some(response) => response,
            None => Ok(OrderReceipt::filled(
                format!("FAKE-{}", order.id.simple()),
                order.quantity,
                self.fill_price,
                Decimal::ZERO,
            )),
        }
    }
}

#[async_trait]
impl OrderAdapter for FakeAdapter {
    fn name(&self) -> &'static str {
        "fake"
    }

    async fn place_order(&self, order: &Order) -> Result<OrderReceipt, AdapterError> {
        self.calls.lock().push(FakeCall::Place(order.clone()));
        self.respond(order)
    }

    async fn query_order(&self, order: &Order) -> Result<OrderReceipt, AdapterError> {
        self.calls.lock().push(FakeCall::Query(order.clone()));
        self.respond(order)
    }

    async fn cancel_order(&self, order: &Order) -> Result<OrderReceipt, AdapterError> {
        self.calls.lock().push(FakeCall::Cancel(order.clone()));
        self.respond(order)
    }
}
