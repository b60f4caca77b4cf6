diesel::table! {
    orders (id) {
        id -> Uuid,
        status -> Varchar,
        customer_id -> Uuid,
        items_price -> Nullable<Numeric>,
        total_price -> Nullable<Numeric>,
        shipping_id -> Nullable<Uuid>,
        transaction_id -> Nullable<Uuid>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    order_items (order_id, product_id) {
        order_id -> Uuid,
        product_id -> Uuid,
        quantity -> Int4,
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

diesel::joinable!(order_items -> orders (order_id));

diesel::allow_tables_to_appear_in_same_query!(orders, order_items, event_outbox);
