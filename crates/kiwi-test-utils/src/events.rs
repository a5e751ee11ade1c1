use alloy::primitives::{Address, U256};
use kiwi_core::codec::abi::DecodedEvent;

/// Chainable checks on one decoded event
pub struct EventAssertion<'a> {
    event: &'a DecodedEvent,
}

pub fn assert_event(event: &DecodedEvent) -> EventAssertion<'_> {
    EventAssertion { event }
}

impl<'a> EventAssertion<'a> {
    #[track_caller]
    pub fn field_address(self, field: &str, expected: Address) -> Self {
        assert_eq!(
            self.event.address_field(field),
            Some(expected),
            "{}.{} in {:?}",
            self.event.name,
            field,
            self.event
        );
        self
    }

    #[track_caller]
    pub fn field_uint(self, field: &str, expected: u64) -> Self {
        self.field_u256(field, U256::from(expected))
    }

    #[track_caller]
    pub fn field_u256(self, field: &str, expected: U256) -> Self {
        assert_eq!(
            self.event.uint_field(field),
            Some(expected),
            "{}.{} in {:?}",
            self.event.name,
            field,
            self.event
        );
        self
    }

    #[track_caller]
    pub fn field_bool(self, field: &str, expected: bool) -> Self {
        assert_eq!(
            self.event.bool_field(field),
            Some(expected),
            "{}.{} in {:?}",
            self.event.name,
            field,
            self.event
        );
        self
    }
}
