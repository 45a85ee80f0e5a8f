pub mod aster;
