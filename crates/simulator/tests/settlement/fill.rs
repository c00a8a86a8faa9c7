use {
    crate::setup::{EXPIRATION, erc20, funded, simulator},
    account_balances::{Allowance, Balance, BalanceKey, MockBalanceFetching, StaticBalances},
    alloy_primitives::{Address, U256},
    maplit::hashmap,
    mockall::predicate::eq,
    model::{Asset, AssetKey, FillResults, Order, OrderBuilder, OrderStatus},
    simulator::{SimulationError, TradeSide, TransferError, TransferType},
    testlib::{accounts, tokens},
};

/// Sells 100 WETH for 200 DAI with fees of 10 and 20 ZRX.
fn order() -> Order {
    OrderBuilder::default()
        .with_maker(accounts::MAKER)
        .with_fee_recipient(accounts::FEE_RECIPIENT)
        .with_maker_asset(Asset::erc20(tokens::WETH), U256::from(100))
        .with_taker_asset(Asset::erc20(tokens::DAI), U256::from(200))
        .with_maker_fee(Asset::erc20(tokens::ZRX), U256::from(10))
        .with_taker_fee(Asset::erc20(tokens::ZRX), U256::from(20))
        .with_expiration(EXPIRATION)
        .build()
}

fn funded_parties() -> StaticBalances {
    funded(&[
        (accounts::MAKER, tokens::ZRX, 10),
        (accounts::TAKER, tokens::DAI, 200),
        (accounts::TAKER, tokens::ZRX, 20),
    ])
    .with_balance(
        AssetKey::Erc20(tokens::WETH),
        accounts::MAKER,
        Balance::Fungible(U256::from(100)),
    )
    .with_allowance(
        AssetKey::Erc20(tokens::WETH),
        accounts::MAKER,
        Allowance::Finite(U256::from(100)),
    )
}

#[tokio::test]
async fn partial_fill_moves_assets_and_fees() {
    let mut simulator = simulator(funded_parties());
    let order = order();

    let result = simulator
        .simulate_fill(&order, accounts::TAKER, U256::from(100))
        .await
        .unwrap();

    let expected = FillResults {
        maker_asset_filled_amount: U256::from(50),
        taker_asset_filled_amount: U256::from(100),
        maker_fee_paid: U256::from(5),
        taker_fee_paid: U256::from(10),
    };
    assert_eq!(result.results, expected);

    let ledger = &result.ledger;
    assert_eq!(erc20(ledger, tokens::WETH, accounts::MAKER), U256::from(50));
    assert_eq!(erc20(ledger, tokens::WETH, accounts::TAKER), U256::from(50));
    assert_eq!(erc20(ledger, tokens::DAI, accounts::MAKER), U256::from(100));
    assert_eq!(erc20(ledger, tokens::DAI, accounts::TAKER), U256::from(100));
    assert_eq!(erc20(ledger, tokens::ZRX, accounts::MAKER), U256::from(5));
    assert_eq!(erc20(ledger, tokens::ZRX, accounts::TAKER), U256::from(10));
    assert_eq!(
        erc20(ledger, tokens::ZRX, accounts::FEE_RECIPIENT),
        U256::from(15)
    );
    for (token, supply) in [(tokens::WETH, 100u64), (tokens::DAI, 200), (tokens::ZRX, 30)] {
        assert_eq!(ledger.total(&AssetKey::Erc20(token)), U256::from(supply));
    }
    assert_eq!(
        ledger.allowance(&AssetKey::Erc20(tokens::WETH), accounts::MAKER),
        Some(&Allowance::Finite(U256::from(50)))
    );
    assert_eq!(
        ledger.allowance(&AssetKey::Erc20(tokens::DAI), accounts::TAKER),
        Some(&Allowance::Unlimited)
    );

    let [event] = result.events.as_slice() else {
        panic!("expected exactly one fill event");
    };
    assert_eq!(event.order_hash, simulator.order_hash(&order));
    assert_eq!(event.maker_address, accounts::MAKER);
    assert_eq!(event.taker_address, accounts::TAKER);
    assert_eq!(event.fee_recipient_address, accounts::FEE_RECIPIENT);
    assert_eq!(event.fill_results, expected);
    assert_eq!(
        simulator.order_info(&order).taker_asset_filled_amount,
        U256::from(100)
    );
}

#[tokio::test]
async fn filling_a_fully_filled_order_fails() {
    let mut simulator = simulator(funded_parties());
    let order = order();

    let first = simulator
        .simulate_fill(&order, accounts::TAKER, U256::from(120))
        .await
        .unwrap();
    assert_eq!(first.results.maker_asset_filled_amount, U256::from(60));

    // Only 80 are left, so the larger request is capped.
    let second = simulator
        .simulate_fill(&order, accounts::TAKER, U256::from(100))
        .await
        .unwrap();
    assert_eq!(
        second.results,
        FillResults {
            maker_asset_filled_amount: U256::from(40),
            taker_asset_filled_amount: U256::from(80),
            maker_fee_paid: U256::from(4),
            taker_fee_paid: U256::from(8),
        }
    );
    assert_eq!(
        simulator.order_info(&order).status,
        OrderStatus::FullyFilled
    );

    let before = simulator.ledger();
    let err = simulator
        .simulate_fill(&order, accounts::TAKER, U256::from(1))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        SimulationError::Transfer(TransferError::InsufficientBalance {
            side: TradeSide::Maker,
            kind: TransferType::Trade,
        })
    ));
    assert_eq!(simulator.ledger(), before);
}

#[tokio::test]
async fn failed_fill_leaves_ledger_untouched() {
    // The taker can pay for the trade but not for the fee.
    let fetcher = funded(&[
        (accounts::MAKER, tokens::WETH, 100),
        (accounts::MAKER, tokens::ZRX, 10),
        (accounts::TAKER, tokens::DAI, 200),
    ])
    .with_allowance(
        AssetKey::Erc20(tokens::ZRX),
        accounts::TAKER,
        Allowance::Unlimited,
    );
    let mut simulator = simulator(fetcher);
    let order = order();

    let err = simulator
        .simulate_fill(&order, accounts::TAKER, U256::from(100))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        SimulationError::Transfer(TransferError::InsufficientBalance {
            side: TradeSide::Taker,
            kind: TransferType::Fee,
        })
    ));

    let ledger = simulator.ledger();
    assert_eq!(erc20(&ledger, tokens::WETH, accounts::MAKER), U256::from(100));
    assert_eq!(erc20(&ledger, tokens::WETH, accounts::TAKER), U256::ZERO);
    assert_eq!(erc20(&ledger, tokens::ZRX, accounts::MAKER), U256::from(10));
    assert_eq!(
        erc20(&ledger, tokens::ZRX, accounts::FEE_RECIPIENT),
        U256::ZERO
    );
    assert_eq!(erc20(&ledger, tokens::DAI, accounts::TAKER), U256::from(200));
    assert_eq!(
        simulator.order_info(&order).taker_asset_filled_amount,
        U256::ZERO
    );
}

#[tokio::test]
async fn insufficient_maker_allowance() {
    let fetcher = funded_parties().with_allowance(
        AssetKey::Erc20(tokens::WETH),
        accounts::MAKER,
        Allowance::Finite(U256::from(49)),
    );
    let mut simulator = simulator(fetcher);

    let err = simulator
        .simulate_fill(&order(), accounts::TAKER, U256::from(100))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        SimulationError::Transfer(TransferError::InsufficientAllowance {
            side: TradeSide::Maker,
            kind: TransferType::Trade,
        })
    ));
}

#[tokio::test]
async fn fetch_errors_abort_the_fill() {
    let mut fetcher = MockBalanceFetching::new();
    // The maker's allowance for the maker asset is the first state read.
    fetcher
        .expect_fetch_allowance()
        .times(1)
        .with(eq(AssetKey::Erc20(tokens::WETH)), eq(accounts::MAKER))
        .returning(|_, _| Err(anyhow::anyhow!("connection reset")));
    fetcher.expect_fetch_balance().never();
    let mut simulator = simulator(fetcher);

    let err = simulator
        .simulate_fill(&order(), accounts::TAKER, U256::from(100))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        SimulationError::Transfer(TransferError::Fetch(_))
    ));
    assert!(simulator.ledger().balances.is_empty());
}

#[tokio::test]
async fn imprecise_fill_rounds_down() {
    let mut simulator = simulator(funded_parties());

    // 3 DAI buy 1.5 WETH and fractions of the fees.
    let result = simulator
        .simulate_fill(&order(), accounts::TAKER, U256::from(3))
        .await
        .unwrap();

    assert_eq!(
        result.results,
        FillResults {
            maker_asset_filled_amount: U256::from(1),
            taker_asset_filled_amount: U256::from(3),
            maker_fee_paid: U256::ZERO,
            taker_fee_paid: U256::ZERO,
        }
    );
    assert_eq!(erc20(&result.ledger, tokens::WETH, accounts::TAKER), U256::from(1));
    assert_eq!(erc20(&result.ledger, tokens::DAI, accounts::MAKER), U256::from(3));
}

#[tokio::test]
async fn successful_fills_commit_their_writes() {
    let mut simulator = simulator(funded_parties());
    let order = order();
    let checkpoint = simulator.store().checkpoint();

    for _ in 0..10 {
        simulator
            .simulate_fill(&order, accounts::TAKER, U256::from(20))
            .await
            .unwrap();
        assert_eq!(simulator.store().checkpoint(), checkpoint);
    }
    assert_eq!(simulator.order_info(&order).status, OrderStatus::FullyFilled);
    assert_eq!(
        erc20(&simulator.ledger(), tokens::WETH, accounts::TAKER),
        U256::from(100)
    );
}

#[tokio::test]
async fn order_without_taker_pays_nothing() {
    let mut simulator = simulator(funded_parties());
    let order = order();

    let result = simulator
        .simulate_fill(&order, Address::ZERO, U256::from(200))
        .await
        .unwrap();

    let ledger = &result.ledger;
    assert_eq!(erc20(ledger, tokens::WETH, Address::ZERO), U256::from(100));
    assert_eq!(erc20(ledger, tokens::DAI, accounts::MAKER), U256::from(200));
    assert_eq!(
        erc20(ledger, tokens::ZRX, accounts::FEE_RECIPIENT),
        U256::from(30)
    );
    assert_eq!(erc20(ledger, tokens::DAI, accounts::TAKER), U256::ZERO);
}

#[tokio::test]
async fn rejects_unfillable_requests() {
    let mut simulator = simulator(funded_parties());
    let order = order();

    assert!(matches!(
        simulator
            .simulate_fill(&order, accounts::TAKER, U256::ZERO)
            .await,
        Err(SimulationError::InvalidTakerAssetFillAmount)
    ));

    let private = Order {
        taker_address: accounts::OTHER_MAKER,
        ..order.clone()
    };
    assert!(matches!(
        simulator
            .simulate_fill(&private, accounts::TAKER, U256::from(100))
            .await,
        Err(SimulationError::InvalidTaker)
    ));

    let empty = Order {
        maker_asset_amount: U256::ZERO,
        ..order.clone()
    };
    assert!(matches!(
        simulator
            .simulate_fill(&empty, accounts::TAKER, U256::from(100))
            .await,
        Err(SimulationError::OrderNotFillable(
            OrderStatus::InvalidMakerAssetAmount
        ))
    ));

    simulator.cancel_order(&order);
    assert!(matches!(
        simulator
            .simulate_fill(&order, accounts::TAKER, U256::from(100))
            .await,
        Err(SimulationError::OrderNotFillable(OrderStatus::Cancelled))
    ));

    simulator.set_block_timestamp(EXPIRATION);
    assert!(matches!(
        simulator
            .simulate_fill(&order, accounts::TAKER, U256::from(100))
            .await,
        Err(SimulationError::OrderNotFillable(OrderStatus::Expired))
    ));
}

#[tokio::test]
async fn fill_or_kill_requires_the_full_amount() {
    let mut simulator = simulator(funded_parties());
    let order = order();
    simulator.set_filled(&order, U256::from(120));

    let err = simulator
        .simulate_fill_or_kill(&order, accounts::TAKER, U256::from(100))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        SimulationError::IncompleteFill { requested, filled }
            if requested == U256::from(100) && filled == U256::from(80)
    ));
    assert_eq!(
        simulator.order_info(&order).taker_asset_filled_amount,
        U256::from(120)
    );
    assert_eq!(
        erc20(&simulator.ledger(), tokens::WETH, accounts::MAKER),
        U256::from(100)
    );

    let result = simulator
        .simulate_fill_or_kill(&order, accounts::TAKER, U256::from(80))
        .await
        .unwrap();
    assert_eq!(result.results.maker_asset_filled_amount, U256::from(40));
}

#[tokio::test]
async fn multi_asset_bundle_order() {
    let weth = AssetKey::Erc20(tokens::WETH);
    let dai = AssetKey::Erc20(tokens::DAI);
    let zrx = AssetKey::Erc20(tokens::ZRX);
    let fetcher = StaticBalances::new(
        hashmap! {
            BalanceKey::new(weth, accounts::MAKER) => Balance::Fungible(U256::from(20)),
            BalanceKey::new(dai, accounts::MAKER) => Balance::Fungible(U256::from(30)),
            BalanceKey::new(zrx, accounts::TAKER) => Balance::Fungible(U256::from(10)),
        },
        hashmap! {
            BalanceKey::new(weth, accounts::MAKER) => Allowance::Unlimited,
            BalanceKey::new(dai, accounts::MAKER) => Allowance::Unlimited,
            BalanceKey::new(zrx, accounts::TAKER) => Allowance::Unlimited,
        },
    );
    let bundle = Asset::MultiAsset {
        amounts: vec![U256::from(2), U256::from(3)],
        nested_assets: vec![Asset::erc20(tokens::WETH), Asset::erc20(tokens::DAI)],
    };
    let order = OrderBuilder::default()
        .with_maker(accounts::MAKER)
        .with_maker_asset(bundle, U256::from(10))
        .with_taker_asset(Asset::erc20(tokens::ZRX), U256::from(10))
        .with_expiration(EXPIRATION)
        .build();
    let mut simulator = simulator(fetcher);

    let result = simulator
        .simulate_fill(&order, accounts::TAKER, U256::from(10))
        .await
        .unwrap();

    let ledger = &result.ledger;
    assert_eq!(erc20(ledger, tokens::WETH, accounts::TAKER), U256::from(20));
    assert_eq!(erc20(ledger, tokens::DAI, accounts::TAKER), U256::from(30));
    assert_eq!(erc20(ledger, tokens::ZRX, accounts::MAKER), U256::from(10));
}

#[tokio::test]
async fn non_fungible_order() {
    let kitties = AssetKey::Erc721(tokens::KITTIES);
    let fetcher = funded(&[(accounts::TAKER, tokens::DAI, 100)])
        .with_balance(
            kitties,
            accounts::MAKER,
            Balance::NonFungible([U256::from(7)].into()),
        )
        .with_allowance(kitties, accounts::MAKER, Allowance::Unlimited);
    let order = OrderBuilder::default()
        .with_maker(accounts::MAKER)
        .with_maker_asset(Asset::erc721(tokens::KITTIES, U256::from(7)), U256::from(1))
        .with_taker_asset(Asset::erc20(tokens::DAI), U256::from(100))
        .with_expiration(EXPIRATION)
        .build();
    let mut simulator = simulator(fetcher);

    let result = simulator
        .simulate_fill(&order, accounts::TAKER, U256::from(100))
        .await
        .unwrap();

    assert_eq!(
        result.ledger.balance(&kitties, accounts::TAKER),
        Some(&Balance::NonFungible([U256::from(7)].into()))
    );
    assert_eq!(
        result.ledger.balance(&kitties, accounts::MAKER),
        Some(&Balance::NonFungible(Default::default()))
    );
    assert_eq!(erc20(&result.ledger, tokens::DAI, accounts::MAKER), U256::from(100));
}
