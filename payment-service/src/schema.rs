diesel::table! {
    customer_balances (customer_id) {
        customer_id -> Uuid,
        balance -> Numeric,
    }
}

diesel::table! {
    transactions (id) {
        id -> Uuid,
        order_id -> Nullable<Uuid>,
        customer_id -> Uuid,
        amount -> Numeric,
        processed_at -> Timestamptz,
        reversed_at -> Nullable<Timestamptz>,
    }
}

diesel::table! {
    event_outbox (id) {
        id -> Int8,
        aggregateid -> Text,
        aggregatetype -> Text,
        payload -> Bytea,
        created_at -> Timestamptz,
    }
}

diesel::allow_tables_to_appear_in_same_query!(customer_balances, transactions, event_outbox);
