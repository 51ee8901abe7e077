use rust_decimal::Decimal;

use crate::menu::MenuItem;
use crate::orders::{OrderError, OrderResult, SelectedOption};

/// Service for calculating order prices and subtotals
pub struct PriceCalculator;

impl PriceCalculator {
    /// Unit price of a configured menu item
    ///
    /// # Arguments
    /// * `item` - Menu item being ordered
    /// * `size` - Chosen size label; `None` uses the default size's price when the
    ///   item has one, else the base price
    /// * `selected_options` - Chosen options, each adding its surcharge
    ///
    /// # Returns
    /// Size (or base) price plus option surcharges, or `InvalidSelection` when the
    /// size or an option does not exist on the item
    pub fn unit_price(
        item: &MenuItem,
        size: Option<&str>,
        selected_options: &[SelectedOption],
    ) -> OrderResult<Decimal> {
        let mut price = match size {
            Some(label) => item
                .sizes()
                .iter()
                .find(|s| s.size == label)
                .map(|s| s.price)
                .ok_or_else(|| {
                    OrderError::InvalidSelection(format!(
                        "Size '{}' is not offered for {}",
                        label, item.name
                    ))
                })?,
            None => item
                .default_size()
                .map(|default| default.price)
                .unwrap_or(item.price),
        };

        for selected in selected_options {
            let option = item
                .find_option(&selected.group_name, &selected.option_name)
                .ok_or_else(|| {
                    OrderError::InvalidSelection(format!(
                        "Option '{}' in group '{}' is not offered for {}",
                        selected.option_name, selected.group_name, item.name
                    ))
                })?;
            price += option.price;
        }

        Ok(price)
    }

    /// Subtotal for an order line: quantity * price_snapshot
    pub fn calculate_subtotal(quantity: u32, price_snapshot: Decimal) -> Decimal {
        Decimal::from(quantity) * price_snapshot
    }

    /// Total price for an order: sum of all subtotals
    pub fn calculate_total(subtotals: &[Decimal]) -> Decimal {
        subtotals.iter().sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::menu::{MenuItemDocument, MenuItemSize, MenuOption, OptionGroup};
    use rust_decimal_macros::dec;

    fn milk_tea() -> MenuItem {
        MenuItem::from(MenuItemDocument {
            id: "milk-tea".to_string(),
            name: "Milk Tea".to_string(),
            price: dec!(30000),
            sizes: vec![
                MenuItemSize {
                    size: "M".to_string(),
                    price: dec!(30000),
                    recipe: None,
                    cost_price: None,
                },
                MenuItemSize {
                    size: "L".to_string(),
                    price: dec!(38000),
                    recipe: None,
                    cost_price: None,
                },
            ],
            option_groups: vec![OptionGroup {
                name: "Toppings".to_string(),
                min_selection: 0,
                max_selection: 3,
                options: vec![
                    MenuOption {
                        name: "Pearls".to_string(),
                        price: dec!(5000),
                        recipe: None,
                    },
                    MenuOption {
                        name: "Pudding".to_string(),
                        price: dec!(7000),
                        recipe: None,
                    },
                ],
                connected_menu_item_ids: None,
            }],
            ..MenuItemDocument::default()
        })
    }

    fn topping(name: &str) -> SelectedOption {
        SelectedOption {
            group_name: "Toppings".to_string(),
            option_name: name.to_string(),
        }
    }

    #[test]
    fn test_unit_price_without_size_uses_base_price() {
        let price = PriceCalculator::unit_price(&milk_tea(), None, &[]).unwrap();
        assert_eq!(price, dec!(30000));
    }

    #[test]
    fn test_unit_price_without_size_uses_default_size() {
        let mut document = MenuItemDocument::from(milk_tea());
        document.default_size = Some("L".to_string());
        let item = MenuItem::from(document);

        let price = PriceCalculator::unit_price(&item, None, &[topping("Pearls")]).unwrap();
        assert_eq!(price, dec!(43000));
    }

    #[test]
    fn test_unit_price_with_size_and_options() {
        let price = PriceCalculator::unit_price(
            &milk_tea(),
            Some("L"),
            &[topping("Pearls"), topping("Pudding")],
        )
        .unwrap();
        assert_eq!(price, dec!(50000));
    }

    #[test]
    fn test_unit_price_rejects_unknown_size() {
        let result = PriceCalculator::unit_price(&milk_tea(), Some("XL"), &[]);
        assert!(matches!(result, Err(OrderError::InvalidSelection(_))));
    }

    #[test]
    fn test_unit_price_rejects_unknown_option() {
        let result = PriceCalculator::unit_price(&milk_tea(), None, &[topping("Jelly")]);
        assert!(matches!(result, Err(OrderError::InvalidSelection(_))));
    }

    #[test]
    fn test_calculate_subtotal() {
        assert_eq!(PriceCalculator::calculate_subtotal(3, dec!(4.33)), dec!(12.99));
        assert_eq!(PriceCalculator::calculate_subtotal(1, dec!(3.75)), dec!(3.75));
    }

    #[test]
    fn test_calculate_total() {
        let subtotals = vec![dec!(10.00), dec!(5.50), dec!(3.25)];
        assert_eq!(PriceCalculator::calculate_total(&subtotals), dec!(18.75));
        assert_eq!(PriceCalculator::calculate_total(&[]), Decimal::ZERO);
    }
}

#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;

    /// Total equals the sum of quantity * price over all lines
    #[test]
    fn prop_total_is_sum_of_subtotals() {
        proptest!(|(lines in prop::collection::vec((1u32..100, 0i64..10_000_000), 0..20))| {
            let subtotals: Vec<Decimal> = lines
                .iter()
                .map(|(qty, cents)| PriceCalculator::calculate_subtotal(*qty, Decimal::new(*cents, 2)))
                .collect();
            let expected: Decimal = lines
                .iter()
                .map(|(qty, cents)| Decimal::new(*cents, 2) * Decimal::from(*qty))
                .sum();

            prop_assert_eq!(PriceCalculator::calculate_total(&subtotals), expected);
        });
    }
}
