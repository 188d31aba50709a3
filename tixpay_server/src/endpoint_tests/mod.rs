mod helpers;
mod mocks;

mod catalog;
mod payments;
mod transactions;
