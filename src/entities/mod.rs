pub mod equipment;
pub mod material;
pub mod movement;
pub mod site;
pub mod stock_movement;
pub mod user;
pub mod vehicle;
pub mod vehicle_trip;

pub use equipment::Entity as Equipment;
pub use material::Entity as Material;
pub use movement::Entity as Movement;
pub use site::Entity as Site;
pub use stock_movement::Entity as StockMovement;
pub use user::Entity as User;
pub use vehicle::Entity as Vehicle;
pub use vehicle_trip::Entity as VehicleTrip;
