diesel::table! {
    product_stock (product_id) {
        product_id -> Uuid,
        quantity -> Int4,
    }
}

diesel::table! {
    reservations (id) {
        id -> Uuid,
        order_id -> Uuid,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    reservation_items (reservation_id, product_id) {
        reservation_id -> Uuid,
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

diesel::joinable!(reservation_items -> reservations (reservation_id));

diesel::allow_tables_to_appear_in_same_query!(
    product_stock,
    reservations,
    reservation_items,
    event_outbox,
);
