use sea_orm::{EntityTrait, Order, QueryOrder, QuerySelect, Select};

/// Build the base select for listing a collection.
///
/// Ordering and de-duplication are chosen by the caller on every request.
pub fn collection<E: EntityTrait>(order_by: E::Column, order: Order, distinct: bool) -> Select<E> {
    let select = E::find().order_by(order_by, order);
    if distinct { select.distinct() } else { select }
}
