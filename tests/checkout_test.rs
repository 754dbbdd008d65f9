mod support;

use std::sync::{Arc, Barrier};

use checkout_service::application::checkout::CheckoutRequest;
use checkout_service::domain::errors::DomainError;
use checkout_service::domain::inventory::VariantKey;
use checkout_service::domain::order::OrderStatus;
use checkout_service::domain::order_code::is_well_formed;
use checkout_service::domain::ports::Store;
use checkout_service::domain::pricing::{PricingRuleDraft, RuleType};

use support::*;

#[test]
fn places_order_and_takes_stock() {
    let world = World::new();
    let key = red_small_tote();
    world.stock(key, 5);

    let placed = world
        .checkout
        .checkout(request("+100", vec![line(key, 2, "50")], Some("10")))
        .expect("checkout");

    assert_eq!(placed.order.total, dec("110"));
    assert_eq!(placed.order.delivery_charge, dec("10"));
    assert_eq!(placed.order.status, OrderStatus::Pending);
    assert!(is_well_formed(&placed.order.order_code), "{}", placed.order.order_code);
    assert_eq!(placed.items.len(), 1);
    assert_eq!(placed.items[0].price, dec("50"));
    let shipping = placed.shipping.as_ref().expect("shipping record");
    assert_eq!(shipping.delivery_charge, dec("10"));
    assert_eq!(shipping.details.city, "London");
    assert_eq!(world.available(key), 3);

    let events = world.orders.list_events(placed.order.id).expect("events");
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].event_type, "OrderPlaced");
    assert_eq!(events[0].order_code, placed.order.order_code);
}

#[test]
fn one_short_line_rejects_the_whole_order() {
    let world = World::new();
    let plenty = red_small_tote();
    let scarce = VariantKey::new(TOTE, Some(BLUE), Some(LARGE));
    world.stock(plenty, 10);
    world.stock(scarce, 1);

    let err = world
        .checkout
        .checkout(request(
            "+100",
            vec![line(plenty, 3, "50"), line(scarce, 2, "50")],
            None,
        ))
        .expect_err("second line is short");

    match err {
        DomainError::InsufficientStock {
            product_id,
            color_id,
            requested,
            available,
            ..
        } => {
            assert_eq!(product_id, TOTE);
            assert_eq!(color_id, Some(BLUE));
            assert_eq!(requested, 2);
            assert_eq!(available, 1);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(world.available(plenty), 10);
    assert_eq!(world.available(scarce), 1);
    assert!(world.orders.list_all_orders().expect("list").is_empty());
}

#[test]
fn repeated_lines_are_checked_against_combined_quantity() {
    let world = World::new();
    let key = red_small_tote();
    world.stock(key, 5);

    let err = world
        .checkout
        .checkout(request(
            "+100",
            vec![line(key, 3, "50"), line(key, 3, "50")],
            None,
        ))
        .expect_err("6 requested, 5 available");
    assert!(matches!(
        err,
        DomainError::InsufficientStock {
            requested: 6,
            available: 5,
            ..
        }
    ));
    assert_eq!(world.available(key), 5);
}

#[test]
fn variant_without_record_reports_zero_available() {
    let world = World::new();
    let err = world
        .checkout
        .checkout(request("+100", vec![line(red_small_tote(), 1, "50")], None))
        .expect_err("no inventory record");
    assert!(matches!(
        err,
        DomainError::InsufficientStock {
            requested: 1,
            available: 0,
            ..
        }
    ));
}

#[test]
fn stale_client_price_is_rejected() {
    let world = World::new();
    let key = red_small_tote();
    world.stock(key, 5);

    let err = world
        .checkout
        .checkout(request("+100", vec![line(key, 1, "40")], None))
        .expect_err("client price is stale");
    assert!(matches!(err, DomainError::PriceMismatch { .. }));
    assert_eq!(world.available(key), 5);
}

#[test]
fn tier_price_is_stored_on_the_item() {
    let world = World::new();
    let key = red_small_tote();
    world.stock(key, 20);
    world.rule(5, None, "45", 1);

    let placed = world
        .checkout
        .checkout(request("+100", vec![line(key, 6, "45.00")], None))
        .expect("checkout");
    assert_eq!(placed.items[0].price, dec("45"));
    assert_eq!(placed.order.total, dec("270"));
}

#[test]
fn fractional_discount_is_charged_in_whole_cents() {
    let world = World::new();
    let key = red_small_tote();
    world.stock(key, 5);
    world
        .pricing
        .create_rule(PricingRuleDraft {
            product_id: TOTE,
            color_id: None,
            size_id: None,
            min_quantity: 1,
            max_quantity: None,
            unit_price: dec("10"),
            discount_percentage: Some(dec("33.33")),
            rule_name: Some("Third off".to_string()),
            rule_type: RuleType::Standard,
            is_active: true,
            priority: 5,
        })
        .expect("rule");

    let placed = world
        .checkout
        .checkout(CheckoutRequest {
            total: Some(dec("30.01")),
            ..request("+100", vec![line(key, 3, "6.67")], Some("10"))
        })
        .expect("checkout");

    assert_eq!(placed.items[0].price, dec("6.67"));
    assert_eq!(placed.items[0].price.fractional_digit_count(), 2);
    assert_eq!(placed.order.total, dec("30.01"));
    let shipping = placed.shipping.as_ref().expect("shipping record");
    assert_eq!(
        placed.items_subtotal() + &shipping.delivery_charge,
        placed.order.total
    );
}

#[test]
fn active_delivery_area_sets_the_charge() {
    let world = World::new();
    let key = red_small_tote();
    world.stock(key, 5);

    let mut req = request("+100", vec![line(key, 1, "50")], None);
    req.shipping.delivery_area = Some(INSIDE_CITY.to_string());
    let placed = world.checkout.checkout(req).expect("checkout");
    assert_eq!(placed.order.delivery_charge, dec("10"));
    assert_eq!(placed.order.total, dec("60"));

    let mut req = request("+100", vec![line(key, 1, "50")], Some("5"));
    req.shipping.delivery_area = Some(INSIDE_CITY.to_string());
    assert!(matches!(
        world.checkout.checkout(req),
        Err(DomainError::PriceMismatch { .. })
    ));
}

#[test]
fn inactive_delivery_area_is_refused() {
    let world = World::new();
    let key = red_small_tote();
    world.stock(key, 5);

    let mut req = request("+100", vec![line(key, 1, "50")], None);
    req.shipping.delivery_area = Some(CLOSED_AREA.to_string());
    assert!(matches!(
        world.checkout.checkout(req),
        Err(DomainError::InvalidInput(_))
    ));
    assert_eq!(world.available(key), 5);
}

#[test]
fn quoted_total_must_match_server_total() {
    let world = World::new();
    let key = red_small_tote();
    world.stock(key, 5);

    let mut req = request("+100", vec![line(key, 2, "50")], Some("10"));
    req.total = Some(dec("100"));
    assert!(matches!(
        world.checkout.checkout(req),
        Err(DomainError::PriceMismatch { .. })
    ));

    let mut req = request("+100", vec![line(key, 2, "50")], Some("10"));
    req.total = Some(dec("110.00"));
    assert!(world.checkout.checkout(req).is_ok());
}

#[test]
fn malformed_requests_are_rejected_before_any_write() {
    let world = World::new();
    let key = red_small_tote();
    world.stock(key, 5);

    let empty = request("+100", vec![], None);
    assert!(matches!(
        world.checkout.checkout(empty),
        Err(DomainError::InvalidInput(_))
    ));

    let zero = request("+100", vec![line(key, 0, "50")], None);
    assert!(matches!(
        world.checkout.checkout(zero),
        Err(DomainError::InvalidInput(_))
    ));

    let mut anonymous = request("+100", vec![line(key, 1, "50")], None);
    anonymous.buyer.phone = None;
    assert!(matches!(
        world.checkout.checkout(anonymous),
        Err(DomainError::InvalidInput(_))
    ));
    assert_eq!(world.available(key), 5);
}

#[test]
fn returning_buyer_is_recognised_by_phone() {
    let world = World::new();
    let key = red_small_tote();
    world.stock(key, 5);

    let first = world
        .checkout
        .checkout(request("+100", vec![line(key, 1, "50")], None))
        .expect("first");
    let second = world
        .checkout
        .checkout(request("+100", vec![line(key, 1, "50")], None))
        .expect("second");

    assert_eq!(first.order.user_id, second.order.user_id);
    assert_ne!(first.order.order_code, second.order.order_code);
    assert_eq!(
        world
            .orders
            .list_orders_for_user(first.order.user_id)
            .expect("list")
            .len(),
        2
    );
}

#[test]
fn last_unit_sells_once_under_concurrency() {
    let world = World::new();
    let key = red_small_tote();
    world.stock(key, 1);

    let checkout = Arc::new(world.checkout);
    let barrier = Arc::new(Barrier::new(4));
    let handles: Vec<_> = (0..4)
        .map(|n| {
            let checkout = Arc::clone(&checkout);
            let barrier = Arc::clone(&barrier);
            std::thread::spawn(move || {
                barrier.wait();
                checkout.checkout(request(&format!("+20{n}"), vec![line(key, 1, "50")], None))
            })
        })
        .collect();
    let results: Vec<_> = handles
        .into_iter()
        .map(|h| h.join().expect("thread panicked"))
        .collect();

    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(results
        .iter()
        .filter(|r| r.is_err())
        .all(|r| matches!(r, Err(DomainError::InsufficientStock { .. }))));

    let remaining = world
        .store
        .transaction(|uow| uow.find_stock(&key))
        .expect("read")
        .expect("record");
    assert_eq!(remaining.available_quantity, 0);
}
