pub mod hall;
pub mod performance;
pub mod play;
pub mod reservation;
pub mod seat;
pub mod user;

pub use hall::{Hall, HallInput};
pub use performance::{Performance, PerformanceDetail, PerformanceInput, PerformanceSummary};
pub use play::{Actor, ActorInput, Genre, GenreInput, Play, PlayDetail, PlayInput, PlayListItem};
pub use reservation::{Reservation, ReservationInput, ReservationView, Ticket, TicketView};
pub use seat::{format_places, Place};
pub use user::{Credentials, NewUser, ProfileUpdate, RegisterInput, User, UserChanges};
