use mongodb::error::Error as DbError;
use rocket::{
    http::{Status, StatusClass},
    response::Responder,
    Request,
};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Db(#[from] DbError),
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),
    #[error("{1}")]
    Status(Status, String),
}

impl<'r, 'o: 'r> Responder<'r, 'o> for Error {
    fn respond_to(self, _: &'r Request<'_>) -> rocket::response::Result<'o> {
        Err(match self {
            Self::Db(err) => {
                error!("Database error: {err}");
                Status::InternalServerError
            }
            Self::StoreUnavailable(msg) => {
                error!("Store unavailable: {msg}");
                Status::InternalServerError
            }
            Self::Status(status, msg) => {
                if status.class() == StatusClass::ServerError {
                    error!("{msg}");
                } else {
                    warn!("{msg}");
                }
                status
            }
        })
    }
}
