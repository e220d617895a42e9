pub mod ingredient;
pub mod menu_item;
pub mod recipe;
pub mod reservation;
pub mod reservation_ingredient;
pub mod reservation_item;
pub mod user;

pub use ingredient::Entity as Ingredient;
pub use menu_item::Entity as MenuItem;
pub use recipe::Entity as Recipe;
pub use reservation::Entity as Reservation;
pub use reservation_ingredient::Entity as ReservationIngredient;
pub use reservation_item::Entity as ReservationItem;
pub use user::Entity as User;
