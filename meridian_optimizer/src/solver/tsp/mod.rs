pub mod christofides;
pub mod kruskal;
pub mod munkres;
pub mod tsp;
